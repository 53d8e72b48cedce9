/// Example program to print the loaded configuration
///
/// Run with: cargo run -p agile-config --example print_config

fn main() {
    let config = agile_config::AnimeConfig::load();

    println!("=== Agile Anime Configuration ===\n");

    println!("Playback Settings:");
    println!("  Looping: {}", config.playback.looping);
    println!("  Direction: {}", config.playback.direction);
    println!("  Ease: {}", config.playback.ease);
    println!();

    println!("Driver Settings:");
    println!("  Frame Rate: {}", config.driver.frame_rate);
    println!("  Max Frames: {:?}", config.driver.max_frames);
    println!("  Log Filter: {:?}", config.driver.log_filter);
    println!();

    match toml::to_string_pretty(&config) {
        Ok(toml_str) => {
            println!("=== Serialized Configuration ===");
            println!("{}", toml_str);
        }
        Err(e) => {
            eprintln!("Failed to serialize config: {}", e);
        }
    }
}
