use anyhow::Result;

pub mod add;
pub mod push;
pub mod time;

pub use add::AddCommand;
pub use push::PushCommand;
pub use time::TimeCommand;

#[allow(async_fn_in_trait)]
pub trait Command {
    async fn execute(&self) -> Result<()>;
}
