//! WinAnsi encoding for text drawn with the standard Helvetica font.

/// Encodes `text` as WinAnsi bytes. Characters with no WinAnsi code become `?`; tabs and other
/// control characters become spaces.
pub(crate) fn encode_win_ansi(text: &str) -> Vec<u8> {
    text.chars().map(win_ansi_byte).collect()
}

fn win_ansi_byte(c: char) -> u8 {
    match c {
        ' '..='~' => c as u8,
        '\u{a0}'..='\u{ff}' => c as u32 as u8,
        '€' => 0x80,
        '‚' => 0x82,
        '„' => 0x84,
        '…' => 0x85,
        '‘' => 0x91,
        '’' => 0x92,
        '“' => 0x93,
        '”' => 0x94,
        '•' => 0x95,
        '–' => 0x96,
        '—' => 0x97,
        '™' => 0x99,
        c if c.is_control() => b' ',
        _ => b'?',
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ascii_passes_through() {
        assert_eq!(encode_win_ansi("Jane (Doe)"), b"Jane (Doe)".to_vec());
    }

    #[test]
    fn test_latin1_and_punctuation() {
        assert_eq!(encode_win_ansi("José"), vec![b'J', b'o', b's', 0xE9]);
        assert_eq!(encode_win_ansi("O’Neil"), vec![b'O', 0x92, b'N', b'e', b'i', b'l']);
    }

    #[test]
    fn test_unmapped_and_control_characters() {
        assert_eq!(encode_win_ansi("a\tb"), b"a b".to_vec());
        assert_eq!(encode_win_ansi("日本"), b"??".to_vec());
    }
}
