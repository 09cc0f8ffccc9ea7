pub mod handlers;
pub mod postgres;
pub mod protocol;
pub mod routes;
pub mod state;
pub mod storage;
