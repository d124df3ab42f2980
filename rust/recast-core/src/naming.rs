//! Identifier case conversion and reserved-word escaping.
//!
//! Conversions are idempotent: converting an already-converted name is a
//! no-op. Case policy is a target concern, so nothing here is applied
//! during normalization: identifiers keep their Source spelling in IL.

/// Split an identifier into lowercase words on underscore and case
/// boundaries. Digits stick to the word they follow.
fn split_words(name: &str) -> Vec<String> {
    let mut words: Vec<String> = Vec::new();
    let mut current = String::new();
    let chars: Vec<char> = name.chars().collect();

    for (i, &c) in chars.iter().enumerate() {
        if c == '_' {
            if !current.is_empty() {
                words.push(current.clone());
                current.clear();
            }
            continue;
        }
        if c.is_uppercase() {
            let prev_lower = i > 0 && (chars[i - 1].is_lowercase() || chars[i - 1].is_numeric());
            let acronym_end = i > 0
                && chars[i - 1].is_uppercase()
                && i + 1 < chars.len()
                && chars[i + 1].is_lowercase();
            if (prev_lower || acronym_end) && !current.is_empty() {
                words.push(current.clone());
                current.clear();
            }
        }
        current.extend(c.to_lowercase());
    }
    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Convert to snake_case, preserving leading underscores (Source privacy
/// convention).
pub fn to_snake_case(name: &str) -> String {
    let leading: String = name.chars().take_while(|&c| c == '_').collect();
    let words = split_words(name);
    format!("{}{}", leading, words.join("_"))
}

/// Convert to PascalCase.
pub fn to_pascal_case(name: &str) -> String {
    let leading: String = name.chars().take_while(|&c| c == '_').collect();
    let mut out = leading;
    for word in split_words(name) {
        let mut cs = word.chars();
        if let Some(first) = cs.next() {
            out.extend(first.to_uppercase());
            out.push_str(cs.as_str());
        }
    }
    out
}

/// Convert to camelCase.
pub fn to_camel_case(name: &str) -> String {
    let leading: String = name.chars().take_while(|&c| c == '_').collect();
    let mut out = leading;
    for (i, word) in split_words(name).into_iter().enumerate() {
        if i == 0 {
            out.push_str(&word);
        } else {
            let mut cs = word.chars();
            if let Some(first) = cs.next() {
                out.extend(first.to_uppercase());
                out.push_str(cs.as_str());
            }
        }
    }
    out
}

/// Python keywords plus builtins that emitted code routinely calls; shadowing
/// either would change the meaning of the surrounding output.
const PYTHON_RESERVED: &[&str] = &[
    // keywords
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class", "continue",
    "def", "del", "elif", "else", "except", "finally", "for", "from", "global", "if", "import",
    "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return", "try", "while",
    "with", "yield",
    // builtin shadow risks
    "abs", "all", "any", "bin", "bool", "bytearray", "bytes", "chr", "dict", "enumerate", "filter",
    "float", "format", "hash", "hex", "id", "input", "int", "isinstance", "iter", "len", "list",
    "map", "max", "min", "next", "object", "oct", "ord", "pow", "print", "property", "range",
    "repr", "round", "set", "sorted", "str", "sum", "super", "tuple", "type", "vars", "zip",
];

pub fn is_python_reserved(name: &str) -> bool {
    PYTHON_RESERVED.contains(&name)
}

/// Escape a Python identifier that collides with a keyword or builtin by
/// appending a trailing underscore.
pub fn escape_python_ident(name: &str) -> String {
    if is_python_reserved(name) {
        format!("{}_", name)
    } else {
        name.to_string()
    }
}

/// Backing-field name used when a property accessor would otherwise recurse
/// into itself after case collapse.
pub fn backing_field_name(property: &str) -> String {
    format!("_{}_backing", to_snake_case(property))
}

/// Replacement name for a field whose converted name collides with a method.
pub fn collision_field_name(name: &str) -> String {
    format!("_{}_value", name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_basic() {
        assert_eq!(to_snake_case("outputSize"), "output_size");
        assert_eq!(to_snake_case("OutputSize"), "output_size");
        assert_eq!(to_snake_case("blockSize"), "block_size");
    }

    #[test]
    fn snake_acronyms_and_digits() {
        assert_eq!(to_snake_case("SHA256Hash"), "sha256_hash");
        assert_eq!(to_snake_case("toUTF8"), "to_utf8");
        assert_eq!(to_snake_case("Pack32BE"), "pack32_be");
    }

    #[test]
    fn snake_preserves_leading_underscore() {
        assert_eq!(to_snake_case("_privateField"), "_private_field");
    }

    #[test]
    fn snake_is_idempotent() {
        for name in ["outputSize", "SHA256Hash", "_fooBar", "already_snake"] {
            let once = to_snake_case(name);
            assert_eq!(to_snake_case(&once), once);
        }
    }

    #[test]
    fn pascal_basic() {
        assert_eq!(to_pascal_case("output_size"), "OutputSize");
        assert_eq!(to_pascal_case("outputSize"), "OutputSize");
        assert_eq!(to_pascal_case("OutputSize"), "OutputSize");
    }

    #[test]
    fn pascal_is_idempotent() {
        for name in ["outputSize", "sha_variant", "Rijndael"] {
            let once = to_pascal_case(name);
            assert_eq!(to_pascal_case(&once), once);
        }
    }

    #[test]
    fn camel_basic() {
        assert_eq!(to_camel_case("OutputSize"), "outputSize");
        assert_eq!(to_camel_case("output_size"), "outputSize");
    }

    #[test]
    fn escapes_keywords_and_builtins() {
        assert_eq!(escape_python_ident("len"), "len_");
        assert_eq!(escape_python_ident("lambda"), "lambda_");
        assert_eq!(escape_python_ident("rounds"), "rounds");
    }

    #[test]
    fn backing_and_collision_names() {
        assert_eq!(backing_field_name("OutputSize"), "_output_size_backing");
        assert_eq!(collision_field_name("digest"), "_digest_value");
    }
}
