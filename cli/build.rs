fn main() {
    // Only embed version metadata on Windows, where agent hosts often launch the filter via .bat/.cmd wrappers.
    #[cfg(windows)]
    {
        let mut res = winres::WindowsResource::new();

        let version = env!("CARGO_PKG_VERSION");
        let parts: Vec<&str> = version.split('.').collect();
        let version_string = format!(
            "{}.{}.{}.0",
            parts.first().unwrap_or(&"0"),
            parts.get(1).unwrap_or(&"0"),
            parts.get(2).unwrap_or(&"0")
        );

        res.set("ProductName", "stdio-boundary")
            .set(
                "FileDescription",
                "Drops pre-protocol stdout noise from wrapped stdio tool servers",
            )
            .set("OriginalFilename", "stdio-boundary.exe")
            .set("FileVersion", &version_string)
            .set("ProductVersion", version);

        if let Err(e) = res.compile() {
            eprintln!("Warning: Failed to compile Windows resources: {}", e);
        }
    }

    println!("cargo:rerun-if-changed=build.rs");
}
