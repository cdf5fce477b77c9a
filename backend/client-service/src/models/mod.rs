pub mod client;

pub use client::{Client, ClientResponse, Gender, PageMeta};
