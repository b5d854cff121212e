use bake_pipeline::engine::software::SoftwareBaker;
use bake_pipeline::pipeline::{Pipeline, PipelineSettings};
use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
pub struct BakeArgs {
	#[arg(short, long)]
	input_file: PathBuf,
	#[arg(short, long)]
	output_file: PathBuf,
	/// Edge length of the baked textures in pixels.
	#[arg(long, default_value_t = 2048)]
	bake_resolution: u32,
	/// Bake dilation in pixels to suppress seam bleeding.
	#[arg(long, default_value_t = 4)]
	bake_margin: u32,
	/// Name of the atlas UV channel written into the output.
	#[arg(long, default_value = "BakedUV")]
	uv_name: String,
	/// Name taken by the source UV channel when the input declares none.
	#[arg(long, default_value = "UVMap")]
	old_uv_name: String,
	#[arg(long, default_value = "BakedTexture")]
	bake_image_name: String,
	#[arg(long, default_value = "NormalBake")]
	normal_image_name: String,
	#[arg(long, default_value = "MetallicRoughnessBake")]
	mr_image_name: String,
	#[arg(long, default_value = "BakedMaterial")]
	final_material_name: String,
	/// Number of packing attempts; the best result wins.
	#[arg(long, default_value_t = 2)]
	pack_iterations: u32,
	/// Skip writing the renderer debug snapshot next to the output.
	#[arg(long)]
	disable_export_debug: bool,
}

pub fn main() -> ExitCode {
	env_logger::init();
	let args = BakeArgs::parse();
	let settings = PipelineSettings {
		resolution: args.bake_resolution,
		margin: args.bake_margin,
		uv_name: args.uv_name,
		old_uv_name: args.old_uv_name,
		color_image_name: args.bake_image_name,
		normal_image_name: args.normal_image_name,
		mr_image_name: args.mr_image_name,
		final_material_name: args.final_material_name,
		pack_iterations: args.pack_iterations,
		export_debug_snapshot: !args.disable_export_debug,
		..PipelineSettings::default()
	};

	let mut backend = SoftwareBaker::default();
	let mut pipeline = Pipeline::new(&mut backend, settings);
	match pipeline.run(&args.input_file, &args.output_file) {
		Ok(()) => ExitCode::SUCCESS,
		Err(err) => {
			eprintln!("bake-glb: {}: {err}", pipeline.stage());
			ExitCode::FAILURE
		}
	}
}
