pub mod app;
pub mod backend;
pub mod callback;
pub mod component;
pub mod console;
pub mod dates;
pub mod detail;
pub mod error;
pub mod login;
pub mod playlist;
pub mod search;
pub mod selection;
pub mod setlists;
pub mod storage;
