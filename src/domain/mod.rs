pub mod codes;
pub mod directory;
pub mod entities;
pub mod errors;
pub mod ports;
pub mod share;
