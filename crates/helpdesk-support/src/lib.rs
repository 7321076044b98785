//! Turkish customer-support assistant powered by helpdesk-rs.
//!
//! `helpdesk-support` wires the helpdesk-rs agent loop to four mock
//! back-office tools: order status, e-mail update, appointment booking and
//! nearest-store search.
//!
//! # Library usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use helpdesk_rs::ChatClient;
//! use helpdesk_rs::clock::SystemClock;
//! use helpdesk_support::SupportConfig;
//!
//! let client = ChatClient::new(api_key)?;
//! let service = SupportConfig::default().build_service(Arc::new(client), Arc::new(SystemClock))?;
//! let reply = service.handle_user_utterance("cli", "123456 numaralı siparişim nerede?").await;
//! ```
//!
//! # Binary
//!
//! The `helpdesk` binary is an interactive terminal chat:
//!
//! ```sh
//! GROQ_API_KEY=... helpdesk --verbose
//! ```

pub mod config;
pub mod prompt;
pub mod tools;

pub use config::SupportConfig;
pub use prompt::{support_messages, support_prompt_template, support_system_prompt};
pub use tools::SupportToolsExt;
