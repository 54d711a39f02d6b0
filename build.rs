use std::{env, path::PathBuf};

// ffmpeg-sys-next locates FFmpeg on its own everywhere except Windows, where
// a vcpkg install is only found once FFMPEG_DIR points at it.
fn main() {
    for variable in ["FFMPEG_DIR", "VCPKG_ROOT", "VCPKGRS_TRIPLET"] {
        println!("cargo:rerun-if-env-changed={variable}");
    }

    let is_windows = env::var("CARGO_CFG_TARGET_OS").is_ok_and(|os| os == "windows");
    if !is_windows || env::var_os("FFMPEG_DIR").is_some() {
        return;
    }

    let Some(vcpkg_root) = env::var_os("VCPKG_ROOT") else {
        println!("cargo:warning=FFMPEG_DIR is not set; lastframe needs FFmpeg development libraries.");
        return;
    };

    let triplet = env::var("VCPKGRS_TRIPLET").unwrap_or_else(|_| "x64-windows".to_string());
    let candidate = PathBuf::from(vcpkg_root).join("installed").join(triplet);
    if candidate.exists() {
        println!(
            "cargo:warning=Found vcpkg FFmpeg at {0}; set FFMPEG_DIR={0} to use it.",
            candidate.display()
        );
    } else {
        println!(
            "cargo:warning=No vcpkg FFmpeg at {}; install ffmpeg via vcpkg or set FFMPEG_DIR.",
            candidate.display()
        );
    }
}
