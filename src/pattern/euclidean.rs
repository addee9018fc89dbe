//! Bjorklund distribution of pulses across steps.

// -------------------------------------------------------------------------------------------------

/// Distributes `pulses` as evenly as possible over `steps` slots, optionally
/// rotated. Positive rotation shifts the pattern earlier (to the left).
///
/// `euclidean(3, 8, 0)` -> `x..x..x.`
pub fn euclidean(pulses: u32, steps: u32, rotation: i32) -> Vec<bool> {
    if steps == 0 {
        return vec![];
    }
    if pulses >= steps {
        return vec![true; steps as usize];
    }

    // Bjorklund: repeatedly fold the shorter remainder group into the longer
    // prefix groups until at most one remainder group is left.
    let mut head: Vec<Vec<bool>> = vec![vec![true]; pulses as usize];
    let mut tail: Vec<Vec<bool>> = vec![vec![false]; (steps - pulses) as usize];
    while tail.len() > 1 && !head.is_empty() {
        let pairs = head.len().min(tail.len());
        let mut next: Vec<Vec<bool>> = Vec::with_capacity(pairs);
        for _ in 0..pairs {
            let mut group = head.remove(0);
            group.append(&mut tail.remove(0));
            next.push(group);
        }
        // whichever side has groups left over becomes the new remainder
        tail = if head.is_empty() {
            std::mem::take(&mut tail)
        } else {
            std::mem::take(&mut head)
        };
        head = next;
    }

    let mut rhythm: Vec<bool> = head.into_iter().chain(tail).flatten().collect();
    match rotation {
        n if n > 0 => rhythm.rotate_left((n as usize) % (steps as usize)),
        n if n < 0 => rhythm.rotate_right((-n as usize) % (steps as usize)),
        _ => (),
    }
    rhythm
}

// -------------------------------------------------------------------------------------------------
