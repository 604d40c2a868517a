fn main() {
    if let Err(err) = identify_cam_lib::run() {
        log::error!("identify-cam exited with error: {err:#}");
        std::process::exit(1);
    }
}
