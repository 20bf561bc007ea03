//! The process-wide registry. Everything touching it lives in one test so
//! parallel tests in this binary never race on it.

use crate::common::sample_table;
use tabtex::registry::{
    clear_themes, current_theme, read_global, register_theme, set_current_theme,
    unregister_theme,
};
use tabtex::{render_source, FontSize, PublishSpec, StyleOverrides, TableError, Theme};

#[test]
fn global_registry_drives_rendering() {
    let table = sample_table();

    register_theme(
        Theme::new("house")
            .with_font_size(FontSize::ScriptSize)
            .with_shading("green!5")
            .with_striping(true),
        None,
        false,
    )
    .unwrap();
    register_theme(Theme::new("spare"), None, false).unwrap();
    assert!(matches!(
        register_theme(Theme::new("house"), None, false),
        Err(TableError::Configuration(_))
    ));
    assert!(matches!(
        register_theme(Theme::new("striped"), None, true),
        Err(TableError::Configuration(_))
    ));

    set_current_theme(Some("house".into())).unwrap();
    assert_eq!(current_theme().map(|t| t.name), Some("house".to_string()));

    let source = render_source(&PublishSpec::new(&table)).unwrap().source;
    assert!(source.contains("{\\scriptsize\n"));
    assert!(source.contains("\\rowcolors{2}{green!5}{white}"));

    // Per-call fields beat the current theme, a call theme replaces it
    let overrides = StyleOverrides {
        striped: Some(false),
        ..StyleOverrides::default()
    };
    let source = render_source(&PublishSpec::new(&table).with_style(overrides))
        .unwrap()
        .source;
    assert!(!source.contains("\\rowcolors"));
    assert!(source.contains("{\\scriptsize\n"));

    let source = render_source(&PublishSpec::new(&table).with_theme("minimal"))
        .unwrap()
        .source;
    assert!(!source.contains("\\scriptsize"));

    assert!(unregister_theme("spare"));
    assert!(!unregister_theme("spare"));
    assert_eq!(clear_themes(), 1);
    assert!(current_theme().is_none());
    assert!(!read_global().has("house"));
    assert!(matches!(
        set_current_theme(Some("house".into())),
        Err(TableError::Configuration(_))
    ));
}
