use crate::cmd::{VersionArgs, CAMERA_PORT, TELEMETRY_PORT};
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("robolink {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: robolink");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!(
        "build_target: {}",
        option_env!("ROBOLINK_BUILD_TARGET").unwrap_or("unknown")
    );
    println!(
        "build_profile: {}",
        option_env!("ROBOLINK_BUILD_PROFILE").unwrap_or("unknown")
    );
    println!("wire: u64 little-endian length prefix, tagged body");
    println!("default_ports: camera={CAMERA_PORT}, telemetry={TELEMETRY_PORT}");
    println!("features: async={}, cli=true", cfg!(feature = "async"));

    Ok(SUCCESS)
}
