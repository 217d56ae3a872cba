// Stats documents in the compressor's output format
// Each builder returns one `runs` entry; `stats_document` wraps entries into a file body

/// One run entry with the fields the aggregator reads
pub fn run_entry(uid: u64, range_reduction: &str, raw_size: u64, compressed_size: u64, max_error: f64) -> String {
    let ratio = raw_size as f64 / compressed_size as f64;
    format!(
        r#"	{{
		algorithm_uid = {uid}
		algorithm_name = "Uniformly Sampled"
		rotation_format = "Quat_48"
		translation_format = "Vector3_96"
		range_reduction = "{range_reduction}"
		raw_size = {raw_size}
		compressed_size = {compressed_size}
		compression_ratio = {ratio}
		compression_time = 0.125
		duration = 1.5
		max_error = {max_error}
		num_animated_tracks = 12
	}}
"#
    )
}

/// Run entry with a nested segmenting stage
pub fn segmented_run_entry(uid: u64, clip_rr: &str, segment_rr: &str) -> String {
    format!(
        r#"	{{
		algorithm_uid = {uid}
		algorithm_name = "Uniformly Sampled"
		rotation_format = "QuatDropW_Variable"
		translation_format = "Vector3_Variable"
		range_reduction = "{clip_rr}"
		raw_size = 4096
		compressed_size = 512
		compression_ratio = 8.0
		compression_time = 0.5
		duration = 3.0
		max_error = 0.004
		segmenting = {{
			num_segments = 2
			range_reduction = "{segment_rr}"
		}}
	}}
"#
    )
}

/// Wrap run entries into a full stats document
pub fn stats_document(entries: &[String]) -> String {
    let mut doc = String::from("version = 1\nclip_name = \"fixture\"\nruns = [\n");
    for entry in entries {
        doc.push_str(entry);
    }
    doc.push_str("]\n");
    doc
}
