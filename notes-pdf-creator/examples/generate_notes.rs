//! Render a small bilingual notes PDF through the C entry point.

use std::ffi::CString;

fn main() -> Result<(), Box<dyn std::error::Error>> {
    println!("Generating sample study notes...");

    let chapter = CString::new("Biology")?;
    let response = CString::new(
        r#"Sure! Here is the JSON:
{"questions": [
  {"question": "What is a cell?",
   "answer_en": "The cell is the basic structural and functional unit of all living organisms.",
   "answer_ur": "خلیہ تمام جانداروں کی بنیادی ساختی اور فعلی اکائی ہے۔"},
  {"question": "What is photosynthesis?",
   "answer_en": "The process by which green plants make food from sunlight, water and carbon dioxide.",
   "answer_ur": ""}
]}"#,
    )?;
    let output_path = CString::new("Biology_notes.pdf")?;

    let result = notes_pdf_creator::generate_notes_pdf(chapter.as_ptr(), response.as_ptr(), output_path.as_ptr());

    match result {
        0 => println!("✅ PDF generated: Biology_notes.pdf"),
        _ => println!("❌ PDF generation failed with code: {}", result),
    }

    Ok(())
}
