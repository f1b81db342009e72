//! Platform adapters for the activity hub.
//!
//! An adapter owns the connection state for one platform. Raw webhook events are fed in
//! through [`Adapter::handle_event`]; validated activities come out of the receiver returned by
//! [`Adapter::listen`]. Outbound activities go through [`Adapter::send`], which validates them,
//! builds platform payloads and hands them to a [`Transport`].

mod adapter;
pub mod config;
mod error;
pub mod kik;
pub mod messenger;
pub mod slack;
pub mod sms;
pub mod transport;

pub use adapter::{Adapter, AdapterBase, AdapterEvent, AdapterStatus, SendReceipt};
pub use config::{KikConfig, MessengerConfig, SlackConfig, SmsConfig};
pub use error::{AdapterError, TransportError};
pub use kik::KikAdapter;
pub use messenger::MessengerAdapter;
pub use slack::SlackAdapter;
pub use sms::SmsAdapter;
#[cfg(any(test, feature = "testkit"))]
pub use transport::RecordingTransport;
pub use transport::{Auth, HttpTransport, Payload, Transport, TransportRequest, TransportResponse};
