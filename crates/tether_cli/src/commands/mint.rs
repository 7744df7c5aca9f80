use clap::Args;
use tether::Identifier;
use tether_utils::{ok, AnyResult};

#[derive(Args)]
pub struct MintCommand {
    /// How many identifiers to print
    #[clap(long, short = 'n', default_value_t = 1)]
    pub count: usize,
}

impl crate::Command for MintCommand {
    fn run(self) -> AnyResult {
        for _ in 0..self.count {
            println!("{}", Identifier::generate());
        }
        ok()
    }
}
