use dragon_settings::config::conventional_search_paths;
use dragon_settings::{environ_setting, AppContext, PathSetting, Schema};

fn main() -> Result<(), dragon_settings::Error> {
    // Advisories (missing optional settings or paths) are tracing warnings
    tracing_subscriber::fmt::init();

    let database = Schema::builder("DatabaseConfiguration")
        .setting("host", "localhost")
        .setting("port", 5432)
        .setting("database", "app")
        .setting("user", "postgres")
        .setting("password", environ_setting("DATABASE_PASSWORD", Some(""), true)?)
        .build();

    let schema = Schema::builder("ExampleConfiguration")
        .with_search_paths(conventional_search_paths("myapp"))
        .with_search_path("demos/example-config.yaml")
        .with_env("MYAPP", "__")
        .setting("debug", true)
        .setting("testing", false)
        .setting("database", database.instantiate())
        .descriptor("datadir", PathSetting::new().raises(false).required(false))
        .build();

    let ctx = AppContext::builder().load(&schema)?.build()?;
    let settings = ctx.settings();

    println!("{settings}");
    println!();
    println!(
        "Database: {}@{}:{}",
        settings["database"]["user"], settings["database"]["host"], settings["database"]["port"]
    );

    Ok(())
}
