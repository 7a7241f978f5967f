#[buildable::builders]
mod site {
    use buildable::Builder;

    #[derive(Builder, Debug, Default)]
    pub struct Stats {
        #[builder(ignore)]
        pub hits: u64,
    }

    #[derive(Builder, Debug)]
    pub struct Page {
        pub title: String,
        pub stats: Stats,
    }
}

fn main() {
    let page = site::Page::builder()
        .title("home".to_string())
        .stats(site::Stats::default())
        .build()
        .unwrap();
    assert_eq!(page.stats.hits, 0);
}
