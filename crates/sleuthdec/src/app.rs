//! Report rendering

use rfsleuth::AnalysisResult;

/// Print the analysis result as a human-readable report
pub fn print_report(result: &AnalysisResult) {
    match &result.signal_parameters {
        Some(params) => {
            println!("signal parameters:");
            println!("  modulation   {}", params.modulation);
            println!("  bit length   {} samples/symbol", params.bit_length);
            println!("  center       {:.6}", params.center);
            println!("  noise        {:.6}", params.noise);
            println!("  tolerance    {} samples", params.tolerance);
        }
        None => {
            println!("no signal detected");
            return;
        }
    }

    println!();
    println!("messages ({}):", result.num_messages);
    for (i, msg) in result.messages.iter().enumerate() {
        println!(
            "  [{i:>3}] {}  ({} bits, pause {})",
            msg.hex(),
            msg.len(),
            msg.pause()
        );
        let ascii = msg.ascii();
        if ascii.chars().any(|c| c != '.') {
            println!("        ascii: {ascii}");
        }
    }

    if !result.protocol_fields.is_empty() {
        println!();
        println!("protocol fields:");
        for field in &result.protocol_fields {
            println!(
                "  {:<10} {:>5}..{:<5} {}",
                field.label.to_string(),
                field.start,
                field.end,
                field.message_type
            );
        }
    }
}

/// Print the analysis result as JSON on stdout
pub fn print_json(result: &AnalysisResult) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(result)?);
    Ok(())
}
