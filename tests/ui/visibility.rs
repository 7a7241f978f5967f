mod config {
    use buildable::Builder;

    #[derive(Builder)]
    pub struct Config {
        pub host: String,
        #[builder(default = 8080)]
        pub port: u16,
    }
}

use buildable::Buildable;

fn main() {
    let config = config::Config::build(|b| b.host("localhost".to_string())).unwrap();
    assert_eq!(config.port, 8080);

    let builder: config::ConfigBuilder = config::Config::builder();
    let _ = builder.port(1).host(String::new());
}
