mod http;
mod index_adapter;
mod parser;
mod storage;

pub use http::{HttpClient, HttpResponse, HttpTimeouts, NetworkError};
pub use index_adapter::{IndexAdapter, IndexPage};
pub use parser::{ParseResult, Parser};
pub use storage::{ObjectStore, Storage, StorageKey};
