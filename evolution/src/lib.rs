//! Cliente da Evolution API (gateway WhatsApp)
//!
//! Este crate fornece uma interface tipo-segura para o gateway Evolution API,
//! cobrindo o ciclo de vida de instâncias e o envio de mensagens de texto:
//!
//! - **Instâncias**: criação, listagem, QR code de conexão, estado da
//!   conexão, logout e remoção (`instances::InstanceManager`)
//! - **Mensagens**: envio de texto via instância conectada
//!   (`messages::MessageManager`)
//!
//! # Autenticação
//!
//! Todas as requisições levam o header `apikey` com a chave global do
//! gateway (variável `AUTHENTICATION_API_KEY` do Evolution API).
//!
//! # Exemplo Básico
//!
//! ```rust,ignore
//! use evolution::{EvolutionClient, instances::InstanceManager};
//!
//! let client = EvolutionClient::new("http://localhost:8080", "minha-apikey")?;
//! let manager = InstanceManager::new(client);
//! let instances = manager.fetch_instances().await?;
//! ```

pub mod client;
pub mod error;
pub mod instances;
pub mod messages;

pub use client::EvolutionClient;
pub use error::{EvolutionError, Result};
pub use instances::{ConnectionState, CreateInstanceRequest, InstanceInfo, InstanceManager, QrCode};
pub use messages::{MessageManager, SendTextResponse};
