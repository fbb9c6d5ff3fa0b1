mod likes;
mod read;
mod types;
mod write;
