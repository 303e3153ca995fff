use rand::{distributions::Alphanumeric, thread_rng, Rng};

/// Generates a lowercase alphanumeric room identifier.
pub fn random_room_id(length: usize) -> String {
    let mut rng = thread_rng();

    std::iter::repeat_with(|| rng.sample(Alphanumeric) as char)
        .map(|c| c.to_ascii_lowercase())
        .take(length)
        .collect()
}

#[cfg(test)]
mod test {
    use super::random_room_id;

    #[test]
    fn ids_have_the_requested_length_and_charset() {
        let id = random_room_id(16);

        assert_eq!(id.len(), 16);
        assert!(id
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
