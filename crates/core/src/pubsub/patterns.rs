//! Glob matching for pattern subscriptions.
//!
//! Supports the subset of Redis glob syntax used for channel patterns:
//! `*` matches any sequence (including empty), `?` matches exactly one
//! character, and `\` escapes the next character.

/// Checks whether a channel name matches a subscription pattern.
///
/// # Examples
///
/// ```
/// use nsredis_core::pubsub::channel_matches;
///
/// assert!(channel_matches("news.*", "news.sport"));
/// assert!(channel_matches("h?llo", "hello"));
/// assert!(!channel_matches("news.*", "weather.today"));
/// ```
pub fn channel_matches(pattern: &str, channel: &str) -> bool {
    let pattern: Vec<char> = pattern.chars().collect();
    let channel: Vec<char> = channel.chars().collect();

    let (mut p, mut c) = (0, 0);
    // Position after the last `*` seen, and the channel index it was tried at.
    let mut backtrack: Option<(usize, usize)> = None;

    while c < channel.len() {
        match pattern.get(p) {
            Some('*') => {
                p += 1;
                backtrack = Some((p, c));
                continue;
            }
            Some('?') => {
                p += 1;
                c += 1;
                continue;
            }
            Some('\\') if p + 1 < pattern.len() && pattern[p + 1] == channel[c] => {
                p += 2;
                c += 1;
                continue;
            }
            Some(&ch) if ch != '\\' && ch == channel[c] => {
                p += 1;
                c += 1;
                continue;
            }
            _ => {}
        }

        match backtrack {
            Some((star_p, star_c)) => {
                p = star_p;
                c = star_c + 1;
                backtrack = Some((star_p, star_c + 1));
            }
            None => return false,
        }
    }

    pattern[p..].iter().all(|&ch| ch == '*')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exact_match() {
        assert!(channel_matches("chat", "chat"));
        assert!(!channel_matches("chat", "chats"));
        assert!(!channel_matches("chats", "chat"));
    }

    #[test]
    fn test_star() {
        assert!(channel_matches("*", ""));
        assert!(channel_matches("*", "anything"));
        assert!(channel_matches("user:*:events", "user:42:events"));
        assert!(channel_matches("user:*:events", "user::events"));
        assert!(!channel_matches("user:*:events", "user:42:event"));
        assert!(channel_matches("*.log", "a.b.log"));
        assert!(channel_matches("a**b", "ab"));
    }

    #[test]
    fn test_question_mark() {
        assert!(channel_matches("room-?", "room-1"));
        assert!(!channel_matches("room-?", "room-"));
        assert!(!channel_matches("room-?", "room-12"));
    }

    #[test]
    fn test_escape() {
        assert!(channel_matches(r"price\*", "price*"));
        assert!(!channel_matches(r"price\*", "prices"));
        assert!(channel_matches(r"what\?", "what?"));
    }

    #[test]
    fn test_backtracking() {
        assert!(channel_matches("*ab*cd", "xabyabcd"));
        assert!(!channel_matches("*ab*cd", "xabyabc"));
    }

    #[test]
    fn test_empty_pattern() {
        assert!(channel_matches("", ""));
        assert!(!channel_matches("", "chat"));
    }
}
