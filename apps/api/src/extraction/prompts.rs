// Résumé extraction prompt templates.

pub const EXTRACTION_SYSTEM: &str = "\
You are an expert data extractor. \
You turn unstructured résumé and profile text into structured JSON. \
Only report what the text states; use null for anything it does not mention. \
You MUST respond with valid JSON only, with no markdown fences and no explanations.";

pub const EXTRACTION_PROMPT: &str = r#"Extract the following details from the given text and return the result as a valid JSON object without any extra text.

Expected JSON format:
{
  "name": "Full Name",
  "bio": "Brief bio",
  "email": "Email address",
  "mobile_number": "Mobile number",
  "experience": [
    {"job_title": "Title", "company": "Company", "years": "Number of years"}
  ],
  "education": [
    {"degree": "Degree", "institution": "University/College", "year": "Year of graduation"}
  ],
  "certificates": [
    {"title": "Certificate Name", "issuer": "Issuing Organization", "year": "Year of Issue"}
  ]
}

Text:
{raw_text}

Strictly return only a valid JSON object. Do not include any additional text."#;
