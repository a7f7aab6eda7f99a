//! CSV download of saved favorites.

use crate::session::FavoriteEntry;

pub const CSV_FILE_NAME: &str = "spotify_favorites.csv";

const HEADER: [&str; 6] = ["track_name", "artist", "spotify_url", "album", "mood", "genre"];

pub fn favorites_to_csv(favorites: &[FavoriteEntry]) -> String {
    let mut out = String::new();
    push_row(&mut out, &HEADER);
    for f in favorites {
        push_row(
            &mut out,
            &[
                f.track_name.as_str(),
                f.artist.as_str(),
                f.spotify_url.as_str(),
                f.album.as_str(),
                f.mood.as_str(),
                f.genre.as_str(),
            ],
        );
    }
    out
}

fn push_row(out: &mut String, fields: &[&str]) {
    for (i, field) in fields.iter().enumerate() {
        if i > 0 {
            out.push(',');
        }
        push_field(out, field);
    }
    out.push('\n');
}

fn push_field(out: &mut String, field: &str) {
    if field.contains([',', '"', '\r', '\n']) {
        out.push('"');
        out.push_str(&field.replace('"', "\"\""));
        out.push('"');
    } else {
        out.push_str(field);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(track_name: &str, album: &str) -> FavoriteEntry {
        FavoriteEntry {
            track_name: track_name.into(),
            artist: "Artist".into(),
            spotify_url: "https://open.spotify.com/track/x".into(),
            album: album.into(),
            mood: "Calm".into(),
            genre: "Not specified".into(),
        }
    }

    #[test]
    fn empty_export_is_just_the_header() {
        assert_eq!(
            favorites_to_csv(&[]),
            "track_name,artist,spotify_url,album,mood,genre\n"
        );
    }

    #[test]
    fn rows_follow_column_order() {
        let csv = favorites_to_csv(&[entry("Weightless", "Ambient")]);
        let rows: Vec<&str> = csv.lines().collect();
        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[1],
            "Weightless,Artist,https://open.spotify.com/track/x,Ambient,Calm,Not specified"
        );
    }

    #[test]
    fn fields_with_separators_are_quoted() {
        let csv = favorites_to_csv(&[entry("Hello, \"World\"", "Line\nBreak")]);
        assert!(csv.contains("\"Hello, \"\"World\"\"\",Artist"));
        assert!(csv.contains(",\"Line\nBreak\",Calm"));
    }
}
