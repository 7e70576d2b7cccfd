pub mod command_executor;
pub mod token_manager;

pub use command_executor::{combined_output, CommandError, SafeCommandExecutor};
pub use token_manager::{mask_token, SecureTokenManager};
