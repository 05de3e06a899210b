use blockshift_common::{BlockPos, BlockUri};
use blockshift_config::ConfigError;

/// Errors from building a session or spawning block behaviour.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("block {block} at {pos} has no behaviour defined")]
    NoBehaviour { block: BlockUri, pos: BlockPos },
}
