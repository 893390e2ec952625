// Interface adapters: backend wire protocol, HTTP client and terminal I/O.

pub mod clients;
pub mod input;
pub mod protocol;
pub mod utils;
pub mod view;
