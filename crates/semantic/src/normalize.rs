/// Replace every line break with a single space.
///
/// Embedding models score raw newlines poorly, so text is flattened before
/// it leaves the process. `\r\n` counts as one break.
pub fn prepare_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(c) = chars.next() {
        match c {
            '\r' => {
                if chars.peek() == Some(&'\n') {
                    chars.next();
                }
                out.push(' ');
            }
            '\n' => out.push(' '),
            other => out.push(other),
        }
    }
    out
}

/// In-place L2 normalization helper to keep allocations down during hot paths.
pub(crate) fn l2_normalize_in_place(v: &mut [f32]) {
    let norm_sq: f32 = v.iter().map(|x| x * x).sum();
    if norm_sq > 0.0 {
        let inv_norm = norm_sq.sqrt().recip();
        for x in v.iter_mut() {
            *x *= inv_norm;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prepare_text_replaces_newlines() {
        assert_eq!(prepare_text("first\nsecond"), "first second");
    }

    #[test]
    fn prepare_text_keeps_one_space_per_break() {
        assert_eq!(prepare_text("a\n\nb"), "a  b");
    }

    #[test]
    fn prepare_text_handles_crlf_and_cr() {
        assert_eq!(prepare_text("a\r\nb\rc"), "a b c");
    }

    #[test]
    fn prepare_text_leaves_plain_text_alone() {
        let text = "no breaks here, just\ttabs";
        assert_eq!(prepare_text(text), text);
    }

    #[test]
    fn l2_normalize_simple_vector() {
        let mut v = vec![3.0f32, 4.0];
        l2_normalize_in_place(&mut v);
        assert!((v[0] - 0.6).abs() < 1e-6);
        assert!((v[1] - 0.8).abs() < 1e-6);
    }

    #[test]
    fn l2_normalize_zero_vector() {
        let mut v = vec![0.0f32, 0.0, 0.0];
        l2_normalize_in_place(&mut v);
        assert_eq!(v, vec![0.0, 0.0, 0.0]);
    }
}
