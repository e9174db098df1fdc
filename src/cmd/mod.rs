pub mod simulate;
pub mod space;
