/// Builds a URL-safe slug: lowercase ASCII letters and digits joined by
/// single dashes. Spanish accented vowels and `ñ` fold to their plain
/// forms instead of being dropped.
pub fn slugify(input: &str) -> String {
    let mut slug = String::with_capacity(input.len());
    let mut pending_dash = false;

    for c in input.chars().flat_map(char::to_lowercase) {
        let mapped = match c {
            'á' | 'à' | 'ä' | 'â' => Some('a'),
            'é' | 'è' | 'ë' | 'ê' => Some('e'),
            'í' | 'ì' | 'ï' | 'î' => Some('i'),
            'ó' | 'ò' | 'ö' | 'ô' => Some('o'),
            'ú' | 'ù' | 'ü' | 'û' => Some('u'),
            'ñ' => Some('n'),
            'ç' => Some('c'),
            c if c.is_ascii_alphanumeric() => Some(c),
            _ => None,
        };

        match mapped {
            Some(c) => {
                if pending_dash && !slug.is_empty() {
                    slug.push('-');
                }
                slug.push(c);
                pending_dash = false;
            }
            None => pending_dash = true,
        }
    }

    slug
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn folds_spanish_accents() {
        assert_eq!(slugify("Camiseta Ñandú"), "camiseta-nandu");
        assert_eq!(slugify("Edición Límitada"), "edicion-limitada");
    }

    #[test]
    fn collapses_separators() {
        assert_eq!(slugify("  Hola --- Mundo!  "), "hola-mundo");
        assert_eq!(slugify("Camisa / Polo (Azul)"), "camisa-polo-azul");
    }

    #[test]
    fn keeps_digits() {
        assert_eq!(slugify("Vestido 2024"), "vestido-2024");
    }

    #[test]
    fn drops_non_latin() {
        assert_eq!(slugify("日本語"), "");
        assert_eq!(slugify(""), "");
    }
}
