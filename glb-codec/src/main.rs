use clap::Parser;
use glb_codec::extract::extract_textures;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct ExtractArgs {
	#[arg(short, long)]
	input_glb: PathBuf,
	#[arg(short, long)]
	out_dir: PathBuf,
}

pub fn main() -> anyhow::Result<()> {
	env_logger::init();
	let args = ExtractArgs::parse();
	let written = extract_textures(&args.input_glb, &args.out_dir)?;
	for path in written {
		println!("{}", path.display());
	}
	Ok(())
}
