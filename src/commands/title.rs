//! `firstline title` - expose the character codec

use crate::cli::{Cli, OutputFormat, TitleCommands};
use crate::commands::open_vault;
use firstline_core::codec::CharacterCodec;
use firstline_core::error::Result;

pub fn run(cli: &Cli, command: &TitleCommands) -> Result<()> {
    let (_, settings) = open_vault(cli)?;
    let codec = CharacterCodec::new(&settings.characters);

    let (input, output, direction) = match command {
        TitleCommands::Encode { title } => (title, codec.encode(title), "encode"),
        TitleCommands::Decode { filename } => (filename, codec.decode(filename), "decode"),
    };

    match cli.format {
        OutputFormat::Json => {
            println!(
                "{}",
                serde_json::json!({
                    "direction": direction,
                    "input": input,
                    "output": output,
                })
            );
        }
        OutputFormat::Human => println!("{}", output),
    }
    Ok(())
}
