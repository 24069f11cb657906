//! `gacha-generator`: turns a (category, rarity) draw into a validated
//! `ContentRecord`.
//!
//! ```text
//! GeneratorRegistry ── resolve("claude") ──▶ Arc<dyn ContentGenerator>
//!                                                  │
//!                 ┌────────────────────────────────┼───────────────────────┐
//!                 ▼                                ▼                       ▼
//!          StaticGenerator        AssistantGenerator<ClaudeDialect>   AssistantGenerator<GeminiDialect>
//!          (embedded table)        file → stdin → interactive          inline → stdin → interactive
//! ```

pub mod assistant;
pub mod dialect;
pub mod error;
pub mod prompt;
pub mod registry;
pub mod static_gen;

use async_trait::async_trait;
use gacha_core::{ContentRecord, GenerationRequest};

pub use assistant::AssistantGenerator;
pub use dialect::{AssistantDialect, ClaudeDialect, GeminiDialect};
pub use error::{GenerateError, Result};
pub use registry::{Availability, GeneratorRegistry, SelfTestReport};
pub use static_gen::StaticGenerator;

/// One interchangeable way of producing content.
#[async_trait]
pub trait ContentGenerator: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, request: &GenerationRequest) -> Result<ContentRecord>;
}
