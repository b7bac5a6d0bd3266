pub mod client;
pub mod model;
pub mod request;
pub mod transport;

pub use client::SolidiClient;
pub use model::{ApiErrorBody, ApiResponse, Amount, Balances, BestVolumePriceQuery, FeeTable};
pub use request::{Request, RequestBuilder, SignedEnvelope, SignedRequest};
pub use transport::{HttpTransport, Transport};
