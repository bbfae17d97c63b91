//! Rowbatch Client Library
//!
//! Sends rows to a rowbatch HTTP receiver.
//!
//! # Example
//!
//! ```no_run
//! use rowbatch_client::{Client, ClientConfig, Request};
//!
//! # async fn example() -> Result<(), rowbatch_client::ClientError> {
//! let client = Client::new(ClientConfig::new("http://127.0.0.1:8124"))?;
//!
//! // buffered: flushed after 1s or 500 rows, whichever comes first
//! let request = Request::buffered("db.events", "id,name", 1000, 500);
//! client.send(&request, &[(1, "a"), (2, "b")]).await?;
//!
//! // synchronous: returns after every sink accepted the rows
//! client.send(&Request::sync("db.events", "id,name"), &[(3, "c")]).await?;
//! # Ok(())
//! # }
//! ```

mod client;
mod error;


pub use client::{Client, ClientConfig, Request, send};
pub use error::{ClientError, Result};
