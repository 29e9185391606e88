//! Text normalization for extracted keys and values
//!
//! Every string that leaves the extractor goes through the same pipeline:
//! line breaks and non-breaking spaces become plain spaces, runs of
//! whitespace collapse to one, the result is trimmed and lowercased, and
//! extended-Latin characters fold to a plain-ASCII equivalent so that
//! downstream keying is stable ("Côte Rôtie" and "Cote Rotie" must land on
//! the same key).

/// Normalizes one extracted string
pub fn normalize_text(input: &str) -> String {
    let mut out = String::with_capacity(input.len());

    for ch in input.chars() {
        let ch = match ch {
            '\u{a0}' | '\r' | '\n' | '\t' => ' ',
            c => c,
        };

        if ch.is_whitespace() {
            if !out.is_empty() && !out.ends_with(' ') {
                out.push(' ');
            }
            continue;
        }

        for lower in ch.to_lowercase() {
            match fold_diacritic(lower) {
                Some(folded) => out.push_str(folded),
                None => out.push(lower),
            }
        }
    }

    while out.ends_with(' ') {
        out.pop();
    }

    out
}

/// Maps one lowercased extended-Latin character to its ASCII fold
///
/// Covers the characters that actually occur in European wine-region
/// names; anything unlisted passes through unchanged.
fn fold_diacritic(ch: char) -> Option<&'static str> {
    let folded = match ch {
        'à' | 'á' | 'â' | 'ã' | 'ä' | 'å' | 'ā' | 'ă' | 'ą' => "a",
        'ç' | 'ć' | 'č' | 'ĉ' => "c",
        'è' | 'é' | 'ê' | 'ë' | 'ē' | 'ė' | 'ę' | 'ě' => "e",
        'ì' | 'í' | 'î' | 'ï' | 'ī' | 'ı' => "i",
        'ñ' | 'ń' | 'ň' => "n",
        'ò' | 'ó' | 'ô' | 'õ' | 'ö' | 'ø' | 'ō' | 'ő' => "o",
        'ù' | 'ú' | 'û' | 'ü' | 'ū' | 'ů' | 'ű' => "u",
        'ý' | 'ÿ' => "y",
        'ś' | 'š' | 'ş' | 'ș' => "s",
        'ź' | 'ž' | 'ż' => "z",
        'ğ' => "g",
        'ľ' | 'ł' => "l",
        'ř' => "r",
        'ť' | 'ț' => "t",
        'ď' | 'đ' | 'ð' => "d",
        'þ' => "th",
        'æ' => "ae",
        'œ' => "oe",
        'ß' => "ss",
        _ => return None,
    };
    Some(folded)
}
