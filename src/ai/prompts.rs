// Prompt templates for the AI gateway. Placeholders are `{name}` and are
// filled with `str::replace` right before sending.

/// Resume review prompt. Replace `{resume_text}`.
pub const RESUME_FEEDBACK_TEMPLATE: &str = r#"You are an expert career coach and resume reviewer, specializing in tech industry roles (Software Engineering, Data Science, Product Management, AI/ML).
Analyze the following resume text thoroughly and provide comprehensive, actionable suggestions for improvement.

Desired output format:
Structure your feedback in Markdown. Use headings (## Section Title) for each category and bullet points for individual suggestions, with clear newlines between points.

Areas to focus on (give detailed feedback for each):
1. Overall impression and summary (2-3 sentences): perceived strengths and the most urgent improvement.
2. Contact information and header: completeness (name, phone, email, LinkedIn, portfolio/GitHub) and professionalism of the email address.
3. Summary/objective statement (if present): clarity, concision, impact, and whether it is tailored to tech roles.
4. Experience: use of action verbs (suggest 2-3 stronger verbs where weak ones appear), quantified achievements (show 1-2 examples of how a point could be quantified), clarity, and relevance.
5. Projects (if present): description of the project and the candidate's role, technologies used, measurable outcomes.
6. Skills: relevance to modern tech roles, organization into categories, and whether any proficiency levels look appropriate.
7. Education: formatting (degree, major, university, graduation date) and relevant coursework for recent graduates.
8. ATS optimization and keywords: are common tech keywords present? Suggest 2-3 that may be missing.
9. Formatting and readability: consistency, bullet usage, overall ease of reading, and appropriate length.
10. Actionable next steps: the 2-3 most important things the candidate should do next.

If the resume text is very short, lacks detail, or is poorly structured, make that a primary point of your feedback and explain why it is a problem.

Resume Text:
---
{resume_text}
---
End of Resume Text. Provide your feedback in Markdown format now."#;

/// Multiple-choice question generation prompt.
/// Replace `{count}`, `{category}`, `{topic}` and `{difficulty}`.
pub const TEST_QUESTIONS_TEMPLATE: &str = r#"You are an expert technical instructor and question writer.
Generate {count} Multiple Choice Questions (MCQs) for a mock test.

Subject Category: "{category}"
Specific Topic: "{topic}"
Target Difficulty Level: "{difficulty}"

Each question must have exactly 4 distinct answer options.
For each question, indicate the correct answer by its 0-based index (0, 1, 2, or 3).
Provide a concise explanation of why the correct answer is correct.
Assign 1 mark to each question.
The difficulty field of each question should reflect that question's own difficulty, ideally close to the target difficulty.

VERY IMPORTANT: Respond with a single JSON array and nothing else. Each element must be an object formatted EXACTLY as follows:
{
  "questionText": "string",
  "options": ["string", "string", "string", "string"],
  "correctOptionIndex": 0,
  "explanation": "string",
  "marks": 1,
  "difficulty": "Easy" | "Medium" | "Hard"
}

Do not include introductory or concluding text, and do not wrap the array in markdown code fences.
Now generate the {count} questions."#;

/// First-turn roadmap prompt. Replace `{role}` and `{message}`.
pub const CAREER_ROADMAP_TEMPLATE: &str = r#"You are an experienced career advisor and mentor in the tech industry.
A user is asking for a career roadmap to become a "{role}". Their initial query was: "{message}".

Provide a structured and actionable roadmap that includes:
1. Introduction to the role (2-3 sentences): what a {role} does.
2. Core skills to master: the key technical skills.
3. Learning phases (Foundational, Intermediate, Advanced): for each phase, specific topics and kinds of learning resources.
4. Project ideas: 2-3 kinds of projects.
5. Portfolio building: why it matters.
6. Interview preparation: the key areas to focus on.
7. Continuous learning: how to stay current.

Format the entire response in Markdown, using headings (## Section Title) and bullet points.
Keep the roadmap practical and motivating.

Now generate the roadmap for the role: "{role}"."#;

pub fn resume_feedback(resume_text: &str) -> String {
    RESUME_FEEDBACK_TEMPLATE.replace("{resume_text}", resume_text)
}

pub fn test_questions(count: u32, category: &str, topic: &str, difficulty: &str) -> String {
    TEST_QUESTIONS_TEMPLATE
        .replace("{count}", &count.to_string())
        .replace("{category}", category)
        .replace("{topic}", topic)
        .replace("{difficulty}", difficulty)
}

pub fn career_roadmap(role: &str, message: &str) -> String {
    CAREER_ROADMAP_TEMPLATE
        .replace("{role}", role)
        .replace("{message}", message)
}
