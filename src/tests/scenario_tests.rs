//! # End-to-End Archive Scenarios
//!
//! These tests build a throwaway archive on disk and drive it the way the
//! binary does: open with the reference site configuration and real SPA
//! ephemeris, run maintenance, then ask for views.

use chrono::{NaiveDate, NaiveDateTime};
use std::fs;
use tempfile::TempDir;
use webcam_lib::archive::Archive;
use webcam_lib::config::Config;
use webcam_lib::view::ViewKey;
use webcam_lib::SizeVariant;

fn at(text: &str) -> NaiveDateTime {
    NaiveDateTime::parse_from_str(text, "%Y%m%d%H%M%S").unwrap()
}

fn archive_with(files: &[&str], now: &str) -> (TempDir, Archive) {
    let dir = TempDir::new().unwrap();
    for file in files {
        let path = dir.path().join(file);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, b"jpeg").unwrap();
    }
    let mut config = Config::default();
    config.site.archive_root = dir.path().to_path_buf();
    let archive = Archive::open(config, at(now));
    (dir, archive)
}

fn shown(archive: &Archive, view: &str) -> Vec<String> {
    archive
        .view(&view.parse().unwrap(), SizeVariant::Full)
        .images
        .iter()
        .map(|image| image.key.to_string())
        .collect()
}

#[test]
fn midnight_sun_day_shows_every_image() {
    let (_dir, archive) = archive_with(
        &[
            "2024/06/10/20240610003000.jpg",
            "2024/06/10/20240610120000.jpg",
            "2024/06/10/20240610233000.jpg",
        ],
        "20250115120000",
    );
    assert_eq!(
        shown(&archive, "2024-06-10"),
        vec!["20240610233000", "20240610120000", "20240610003000"]
    );
    let window = archive.daylight_window(NaiveDate::from_ymd_opt(2024, 6, 10).unwrap());
    assert!(window.midnight_sun);
}

#[test]
fn polar_night_day_uses_fixed_hours() {
    let (_dir, archive) = archive_with(
        &[
            "2024/12/20/20241220053000.jpg",
            "2024/12/20/20241220060000.jpg",
            "2024/12/20/20241220165900.jpg",
            "2024/12/20/20241220170000.jpg",
            "2024/12/20/20241220173000.jpg",
        ],
        "20250115120000",
    );
    assert_eq!(
        shown(&archive, "2024-12-20"),
        vec!["20241220170000", "20241220165900", "20241220060000"]
    );
}

#[test]
fn equinox_night_images_are_hidden() {
    let (_dir, archive) = archive_with(
        &[
            "2024/03/20/20240320020000.jpg",
            "2024/03/20/20240320120000.jpg",
            "2024/03/20/20240320230000.jpg",
        ],
        "20250115120000",
    );
    assert_eq!(shown(&archive, "2024-03-20"), vec!["20240320120000"]);
}

#[test]
fn new_capture_is_latest_after_maintenance() {
    let (dir, archive) = archive_with(
        &[
            "2025/01/15/20250115100000.jpg",
            "2025/01/15/Lillevik Lofoten_01_20250115113000.jpg",
        ],
        "20250115120000",
    );
    assert_eq!(archive.run_maintenance(), 1);
    assert!(dir.path().join("2025/01/15/20250115113000.jpg").is_file());

    let latest = archive.latest().expect("an image was captured today");
    assert_eq!(latest, ViewKey::Single("20250115113000".parse().unwrap()));

    let links = archive.links(&latest);
    assert_eq!(
        links.previous,
        Some(ViewKey::Single("20250115100000".parse().unwrap()))
    );
    assert_eq!(links.next, None);
}

#[test]
fn browsing_up_from_an_image_reaches_the_year() {
    let (_dir, archive) = archive_with(&["2024/06/10/20240610120000.jpg"], "20250115120000");
    let mut view: ViewKey = "20240610120000".parse().unwrap();
    let mut trail = vec![view.to_string()];
    while let Some(up) = archive.links(&view).up {
        trail.push(up.to_string());
        view = up;
    }
    assert_eq!(trail, vec!["20240610120000", "2024-06-10", "2024-06", "2024"]);

    let year = archive.links(&ViewKey::Year(2024));
    assert_eq!(year.next, Some(ViewKey::Year(2025)));
    assert_eq!(year.down, Some(ViewKey::Month(2024, 6)));
}

#[test]
fn view_contents_serialize_for_renderers() {
    let (_dir, archive) = archive_with(
        &[
            "2024/06/10/20240610120000.jpg",
            "2024/06/10/mini/20240610120000.jpg",
        ],
        "20250115120000",
    );
    let contents = archive.view(&"2024-06".parse().unwrap(), SizeVariant::Mini);
    let json = serde_json::to_value(&contents).unwrap();

    assert_eq!(json["view"]["kind"], "month");
    assert_eq!(json["view"]["key"], serde_json::json!([2024, 6]));
    assert_eq!(json["images"][0]["key"], "20240610120000");
    assert_eq!(json["images"][0]["variant"], "mini");
    assert_eq!(json["images"][0]["path"], "2024/06/10/mini/20240610120000.jpg");
    assert_eq!(json["links"]["up"]["key"], 2024);
}
