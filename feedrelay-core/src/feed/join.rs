//! URL path joining.

use url::Url;

/// Append path elements to the path of `base`.
///
/// Elements are joined with `/` and the result is cleaned the way a
/// filesystem path would be (`.` dropped, `..` pops a segment, repeated
/// slashes collapsed). Query string and fragment of `base` are kept.
pub fn url_join(base: &str, elems: &[&str]) -> Result<String, url::ParseError> {
    let mut url = Url::parse(base)?;
    if elems.is_empty() {
        return Ok(url.into());
    }

    let mut segments: Vec<&str> = Vec::new();
    let base_path = url.path().to_string();
    for part in std::iter::once(base_path.as_str()).chain(elems.iter().copied()) {
        for segment in part.split('/') {
            match segment {
                "" | "." => {}
                ".." => {
                    segments.pop();
                }
                other => segments.push(other),
            }
        }
    }

    let path = format!("/{}", segments.join("/"));
    url.set_path(&path);
    Ok(url.into())
}
