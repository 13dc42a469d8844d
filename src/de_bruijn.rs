/// Nucleotide De Bruijn sequence: every k-mer of length `order` occurs exactly
/// once, reading left to right.
///
/// Lyndon words over ACGT whose length divides `order` are concatenated in
/// lexicographic order, then the first `order - 1` bases are appended.
pub fn dna_de_bruijn(order: usize) -> Vec<u8> {
    assert!(order >= 1, "order must be positive");
    let mut seq = Vec::with_capacity(4usize.pow(order as u32) + order - 1);
    // Current Lyndon prefix, as base indices 0..4.
    let mut word: Vec<u8> = vec![0];
    loop {
        if order % word.len() == 0 {
            seq.extend(word.iter().map(|&c| b"ACGT"[c as usize]));
        }
        let period = word.len();
        while word.len() < order {
            word.push(word[word.len() - period]);
        }
        while word.last() == Some(&3) {
            word.pop();
        }
        match word.last_mut() {
            Some(c) => *c += 1,
            None => break,
        }
    }
    seq.extend_from_within(..order - 1);
    seq
}
