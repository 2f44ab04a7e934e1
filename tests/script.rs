mod common;

use common::Fixture;
use lectern::models::TopNav;
use lectern::navigation::scroll_key;
use lectern::script::{ScriptRunner, parse_script};

#[test]
fn test_script_session_with_reload() {
    let fixture = Fixture::book();
    let script = parse_script(
        "\
open 03.md
scroll 640
wait 1200
reload
",
    )
    .unwrap();

    let mut runner = ScriptRunner::start(|page| Ok(fixture.reader(page))).unwrap();
    let transcript = runner.run(&script).unwrap();

    assert!(transcript.iter().any(|line| line == "> reload"));
    assert!(transcript.iter().any(|line| line.ends_with("top-nav hidden")));
    assert_eq!(runner.reader().current_index(), Some(2));
    assert_eq!(runner.page().state().scroll_y, 640.0);
    assert!(!fixture.session.contains(&scroll_key("03.md")));
}

#[test]
fn test_script_reports_unknown_chapters_and_tooltips() {
    let fixture = Fixture::book();
    let script = parse_script("open 99.md\ntooltip 0\ntooltip 5\nkey Enter\n").unwrap();

    let mut runner = ScriptRunner::start(|page| Ok(fixture.reader(page))).unwrap();
    let transcript = runner.run(&script).unwrap();

    assert!(transcript.contains(&"no chapter named 99.md".to_string()));
    assert!(
        transcript
            .iter()
            .any(|line| line.starts_with("tooltip \"A small boat\" [image "))
    );
    assert!(transcript.contains(&"no tooltip for term 5".to_string()));
    assert!(transcript.contains(&"key Enter ignored".to_string()));
}

#[test]
fn test_script_competing_control() {
    let fixture = Fixture::book();
    let script = parse_script("scroll 300\ncompeting on\nwait 2000\ncompeting off\nscroll 100\n")
        .unwrap();

    let mut runner = ScriptRunner::start(|page| Ok(fixture.reader(page))).unwrap();
    runner.apply(&script[0]).unwrap();
    runner.apply(&script[1]).unwrap();
    assert_eq!(runner.reader().top_nav(), TopNav::Hidden);
    runner.apply(&script[2]).unwrap();
    runner.apply(&script[3]).unwrap();
    assert_eq!(runner.reader().top_nav(), TopNav::Hidden);
    runner.apply(&script[4]).unwrap();
    assert_eq!(runner.reader().top_nav(), TopNav::Visible);
}
