use tcpmsg_frame::{DEFAULT_MAX_PAYLOAD, PREFIX_SIZE, RECEIVE_CHUNK_SIZE};

use crate::cmd::VersionArgs;
use crate::exit::{CliResult, SUCCESS};

pub fn run(args: VersionArgs) -> CliResult<i32> {
    if !args.extended {
        println!("tcpmsg {}", env!("CARGO_PKG_VERSION"));
        return Ok(SUCCESS);
    }

    println!("name: tcpmsg");
    println!("version: {}", env!("CARGO_PKG_VERSION"));
    println!(
        "build_target: {}",
        option_env!("TCPMSG_BUILD_TARGET").unwrap_or("unknown")
    );
    println!("target_os: {}", std::env::consts::OS);
    println!("target_arch: {}", std::env::consts::ARCH);
    println!("git_hash: {}", option_env!("GIT_HASH").unwrap_or("unknown"));
    println!(
        "framing: {PREFIX_SIZE}-byte big-endian length prefix, {RECEIVE_CHUNK_SIZE}-byte receive chunks"
    );
    println!("default_max_payload: {DEFAULT_MAX_PAYLOAD}");

    Ok(SUCCESS)
}
