//! Compact JSON summaries of music API objects
//!
//! Tool results go back to a language model, so only the fields it can act
//! on are kept.

use serde_json::{json, Map, Value};

fn str_field<'a>(item: &'a Value, key: &str) -> Option<&'a str> {
    item.get(key).and_then(Value::as_str)
}

fn insert_str(out: &mut Map<String, Value>, item: &Value, key: &str) {
    if let Some(v) = item.get(key).filter(|v| !v.is_null()) {
        out.insert(key.to_string(), v.clone());
    }
}

fn items(value: Option<&Value>) -> impl Iterator<Item = &Value> {
    value
        .and_then(Value::as_array)
        .into_iter()
        .flatten()
        .filter(|v| !v.is_null())
}

/// Single artist as `artist`, several as `artists`
fn insert_artists(out: &mut Map<String, Value>, item: &Value) {
    let names: Vec<Value> = items(item.get("artists"))
        .filter_map(|a| str_field(a, "name"))
        .map(|n| Value::String(n.to_string()))
        .collect();
    match names.len() {
        0 => {}
        1 => {
            out.insert("artist".to_string(), names[0].clone());
        }
        _ => {
            out.insert("artists".to_string(), Value::Array(names));
        }
    }
}

pub fn track(item: &Value, detailed: bool) -> Value {
    let mut out = Map::new();
    insert_str(&mut out, item, "name");
    insert_str(&mut out, item, "id");
    insert_str(&mut out, item, "uri");
    insert_artists(&mut out, item);

    if detailed {
        if let Some(album) = item.get("album").filter(|a| a.is_object()) {
            out.insert("album".to_string(), self::album(album, false));
        }
        insert_str(&mut out, item, "track_number");
        insert_str(&mut out, item, "duration_ms");
        insert_str(&mut out, item, "popularity");
    }
    Value::Object(out)
}

pub fn album(item: &Value, detailed: bool) -> Value {
    let mut out = Map::new();
    insert_str(&mut out, item, "name");
    insert_str(&mut out, item, "id");
    insert_str(&mut out, item, "uri");
    insert_artists(&mut out, item);

    if detailed {
        insert_str(&mut out, item, "release_date");
        insert_str(&mut out, item, "total_tracks");
        let tracks: Vec<Value> = items(item.pointer("/tracks/items"))
            .map(|t| track(t, false))
            .collect();
        out.insert("tracks".to_string(), Value::Array(tracks));
    }
    Value::Object(out)
}

pub fn artist(item: &Value, detailed: bool) -> Value {
    let mut out = Map::new();
    insert_str(&mut out, item, "name");
    insert_str(&mut out, item, "id");
    insert_str(&mut out, item, "uri");
    if detailed {
        insert_str(&mut out, item, "genres");
        if let Some(followers) = item.pointer("/followers/total") {
            out.insert("followers".to_string(), followers.clone());
        }
    }
    Value::Object(out)
}

pub fn playlist(item: &Value, detailed: bool) -> Value {
    let mut out = Map::new();
    insert_str(&mut out, item, "name");
    insert_str(&mut out, item, "id");
    insert_str(&mut out, item, "uri");
    if let Some(owner) = item.pointer("/owner/display_name").filter(|v| !v.is_null()) {
        out.insert("owner".to_string(), owner.clone());
    }
    if let Some(total) = item.pointer("/tracks/total") {
        out.insert("total_tracks".to_string(), total.clone());
    }

    if detailed {
        insert_str(&mut out, item, "description");
        insert_str(&mut out, item, "public");
        let tracks = playlist_tracks(item.pointer("/tracks/items"));
        if let Value::Array(list) = &tracks {
            if !list.is_empty() {
                out.insert("tracks".to_string(), tracks);
            }
        }
    }
    Value::Object(out)
}

/// Playlist track entries wrap the track in `{"track": {...}}`
pub fn playlist_tracks(entries: Option<&Value>) -> Value {
    Value::Array(
        items(entries)
            .filter_map(|entry| entry.get("track").filter(|t| t.is_object()))
            .map(|t| track(t, false))
            .collect(),
    )
}

/// Group search results by requested type (`track`, `album`, ...)
pub fn search_results(results: &Value, qtype: &str) -> Value {
    let mut out = Map::new();
    for kind in qtype.split(',').map(str::trim).filter(|k| !k.is_empty()) {
        let key = format!("{}s", kind);
        let list: Vec<Value> = items(results.pointer(&format!("/{}/items", key)))
            .map(|item| match kind {
                "track" => track(item, false),
                "album" => album(item, false),
                "artist" => artist(item, false),
                "playlist" => playlist(item, false),
                _ => item.clone(),
            })
            .collect();
        out.insert(key, Value::Array(list));
    }
    Value::Object(out)
}

/// Artist with top tracks and albums attached
pub fn artist_with_catalog(artist_item: &Value, albums: &Value, top_tracks: &Value) -> Value {
    let mut out = match artist(artist_item, true) {
        Value::Object(map) => map,
        _ => Map::new(),
    };
    let tracks: Vec<Value> = items(top_tracks.get("tracks"))
        .map(|t| track(t, false))
        .collect();
    let album_list: Vec<Value> = items(albums.get("items"))
        .map(|a| album(a, false))
        .collect();
    out.insert("top_tracks".to_string(), Value::Array(tracks));
    out.insert("albums".to_string(), Value::Array(album_list));
    Value::Object(out)
}

pub fn device(item: &Value) -> Value {
    json!({
        "id": item.get("id").cloned().unwrap_or(Value::Null),
        "name": item.get("name").cloned().unwrap_or(Value::Null),
        "is_active": item.get("is_active").cloned().unwrap_or(Value::Bool(false)),
    })
}
