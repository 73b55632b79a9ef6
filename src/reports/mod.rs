use comfy_table::presets::ASCII_FULL;
use comfy_table::{Attribute, Cell, CellAlignment, Color, ContentArrangement, Table};
use decipher::optimizer::ChainSummary;
use decipher::permutation::Permutation;

const KEY_COLUMNS: usize = 13;

pub fn print_chain_summary(chains: &[ChainSummary], best_chain: usize) {
    let mut table = Table::new();
    table
        .load_preset(ASCII_FULL)
        .set_content_arrangement(ContentArrangement::Dynamic);

    table.set_header(vec![
        Cell::new("Chain").add_attribute(Attribute::Bold),
        Cell::new("Log Prob").fg(Color::Cyan),
        Cell::new("Accepted"),
        Cell::new("Rate"),
    ]);

    for i in 1..=3 {
        if let Some(col) = table.column_mut(i) {
            col.set_cell_alignment(CellAlignment::Right);
        }
    }

    for c in chains {
        let mut name = Cell::new(format!("#{}", c.chain + 1));
        if c.chain == best_chain {
            name = name.fg(Color::Green).add_attribute(Attribute::Bold);
        }
        table.add_row(vec![
            name,
            Cell::new(format!("{:.2}", c.log_prob)).fg(Color::Cyan),
            Cell::new(c.accepted),
            Cell::new(format!("{:.2}%", c.acceptance_rate * 100.0)),
        ]);
    }
    println!("\n{}", table);
}

/// Cipher characters on one row, their plaintext images below.
pub fn print_key_table(key: &Permutation) {
    let pairs: Vec<(char, char)> = key.iter().filter(|(from, to)| from != to).collect();
    if pairs.is_empty() {
        println!("\nKey: identity");
        return;
    }

    let mut table = Table::new();
    table.load_preset(ASCII_FULL);

    for chunk in pairs.chunks(KEY_COLUMNS) {
        let row = |pick: fn(&(char, char)) -> char| -> Vec<Cell> {
            chunk
                .iter()
                .map(|p| Cell::new(printable(pick(p))).set_alignment(CellAlignment::Center))
                .collect()
        };
        table.add_row(row(|p| p.0));
        table.add_row(row(|p| p.1).into_iter().map(|c| c.fg(Color::Green)));
    }
    println!("\nKey (cipher -> plain):\n{}", table);
}

pub fn print_plaintext(log_prob: f64, plaintext: &str) {
    let rule = "*".repeat(80);
    println!("\n{}\n", rule);
    println!("Best log probability: {:.4}\n", log_prob);
    println!("{}\n", plaintext);
    println!("{}", rule);
}

fn printable(c: char) -> String {
    match c {
        ' ' => "␣".to_string(),
        _ => c.to_string(),
    }
}
