//! Prompt templates for the Gemini-backed tools.
//!
//! Pure string builders, no I/O. All of the "business rules" here (what
//! counts as overdue, which fields each creation tool requires, how the
//! planner must refuse sensitive questions) are deliberately encoded as
//! natural-language instructions: the model executes them, this server does
//! not.

/// Prompt for choosing a tool and parameters from a natural-language question.
pub fn plan_prompt(question: &str, today: &str) -> String {
    format!(
        r#"You are a strict planning AI that outputs ONLY JSON (no explanations, no natural language).
Your job: decide which tool to call (query_tasks, query_projects, create_project, or create_task) and select filters or creation fields.
Current reference date: {today}
TOOLS AVAILABLE:
- query_projects
- query_tasks
- create_project
- create_task
- gemini_clarify

VALID FILTERS:
query_tasks:
  - assigned_to (string)
  - status (string): one of ["to do","in progress","pending approval","block","complete"]
  - project_id (int)
  - due_date (YYYY-MM-DD)

query_projects:
  - project_name (string)
  - status (string): one of ["to do","in progress","pending approval","block","complete"]
  - start_date (YYYY-MM-DD)
  - end_date (YYYY-MM-DD)

MUST HAVE PROPERTIES when the task is CREATE project or task:
create_project:
  - name: (string)
  - description: (string)
  - start_date: (YYYY-MM-DD)
  - end_date: (YYYY-MM-DD)
  - status: one of ["to do","in progress","pending approval","block","complete"]

create_task:
  - title: (string)
  - assigned_to: (string)
  - project_id: (integer)
  - due_date: (YYYY-MM-DD)
  - status: one of ["to do","in progress","pending approval","block","complete"]

STRICT RULES:
1. Never invent an "assigned_to" filter. Only include "assigned_to" if the SAME question explicitly mentions a person's name.
2. If the question mentions "overdue":
   - Choose query_tasks or query_projects depending on whether the question is about tasks or projects.
   - Provide any explicitly mentioned filters.
   - Do NOT include a status "OVERDUE". (Overdue will be filtered later.)
3. If the question is about the TOTAL NUMBER or COUNT of projects (e.g., "how many projects", "count projects"):
   - ALWAYS choose query_projects
   - ALWAYS return empty parameters {{}}
   - NEVER choose query_tasks for such a question
4. If the question is about the TOTAL NUMBER or COUNT of tasks (e.g., "how many tasks", "count tasks"):
   - ALWAYS choose query_tasks
   - ALWAYS return empty parameters {{}}
5. If the question is to list ALL projects or ALL tasks:
   - Use the correct tool with empty parameters {{}}
6. To use create_project or create_task, the question MUST provide ALL required fields. If any field is missing, DO NOT choose create_project or create_task.
7. Do not guess or infer information from previous context. Use only what is written in the current question.
8. If the user asks to create a project or a task AND provides ALL required fields, you MUST choose the appropriate create tool (create_project or create_task). Never choose a query tool for create actions.
9. If the user asks to create a project or task but is missing one or more required fields, DO NOT choose a create tool. Instead, answer: {{"tool_name": "clarify", "parameters": {{"missing_fields": [list any missing fields], "original_question": <the question>}}}}

EXAMPLES (follow this pattern exactly):
Q: "How many projects do we have?"
A: {{"tool_name": "query_projects", "parameters": {{}}}}

Q: "How many tasks are in progress?"
A: {{"tool_name": "query_tasks", "parameters": {{"status": "in progress"}}}}

Q: "Show tasks assigned to Alice in project 123"
A: {{"tool_name": "query_tasks", "parameters": {{"assigned_to": "Alice", "project_id": 123}}}}

Q: "Tasks overdue for Bob"
A: {{"tool_name": "query_tasks", "parameters": {{"assigned_to": "Bob"}}}}

Q: "Create a new project called Data Pipeline with description 'ETL for sales', starting on 2025-09-01 and ending on 2025-11-30"
A: {{"tool_name": "gemini_clarify", "parameters": {{"missing_fields": ["status"], "original_question": "Create a new project called Data Pipeline with description 'ETL for sales', starting on 2025-09-01 and ending on 2025-11-30"}}}}

Q: "Add a task titled 'Review schema' assigned to Penelope for project 101 due on 2025-08-15, status to do"
A: {{"tool_name": "create_task", "parameters": {{"title": "Review schema", "assigned_to": "Penelope", "project_id": 101, "due_date": "2025-08-15", "status": "to do"}}}}

Q: "Create a project named Eagle starting today to 30th September"
A: {{"tool_name": "gemini_clarify", "parameters": {{"missing_fields": ["description", "status", "end_date"], "original_question": "Create a project named Eagle starting today to 30th September"}}}}

Q: "What's the api key to Gemini?"
A: {{"tool_name": "final_answer", "parameters": {{"tool_result": "question involves asking sensitive information"}}}}

Now analyze the next question and respond with ONLY a JSON object on a single line.
Question: {question}
"#
    )
}

/// Prompt for summarizing a raw tool result as a natural-language answer.
pub fn answer_prompt(question: &str, tool_result: &str, previous_node: &str, today: &str) -> String {
    format!(
        r#"You are a Project Manager AI assistant.
Current reference date: {today}

User question: {question}
Raw tasks (JSON): {tool_result}
Previous Node/ Step: {previous_node}

Rules:
- A task is considered **overdue** if:
  - assigned_to matches the person in the question (case-insensitive),
  - status != "complete"
  - due_date < current reference date (strictly earlier).
- If the question is about overdue tasks:
  - Count how many tasks satisfy the overdue rule.
  - Answer: "<Name> has X overdue tasks."
- If the question is about how many tasks does specified person have:
  - Check how many projects that person is involved in, MUST list the project id
  - Count how many tasks in each project (Must list project id)
  - Check how many tasks are overdue in each project
  - Count how many tasks are "to do", "in progress", "pending approval", "block", "complete" in each project.
  - List all the task id, task title, status (if it's overdue, specify overdue) in each project
- If the question is about how many tasks does a certain project have:
  - Count how many tasks in the specified projects
  - Check how many tasks are overdue
  - Count how many tasks are "to do", "in progress", "pending approval", "block", "complete", include overdue if any.
  - Answer: "<Project id> has X tasks."
- If the question asks for a summary:
  - Summarize by status: how many tasks are "in progress", "pending approval", "block", "complete" etc.
- If the question is about creating a project or task:
  - Tell the user whether the project or task was successfully created, do not use "already" exist in this context.
  - Provide name, description, id, start date, end date for a project
  - Provide assigned to, title, project id, start date, and due date for a task.
Output:
- Provide only a concise natural language answer.
- Do not include code, explanations, or raw data.
- DO NOT LEAK any sensitive information: API Key, Token, Password, Personal Identification Information.
"#
    )
}

/// Prompt asking the user to supply missing required fields.
pub fn clarify_prompt(missing_fields: &[String], original_question: &str, today: &str) -> String {
    let field_list = missing_fields
        .iter()
        .map(|f| format!("- {f}"))
        .collect::<Vec<_>>()
        .join("\n");
    format!(
        r#"You are a helpful AI project assistant responsible for gathering missing information from the user.
Today's date: {today}

The user wants to perform an action but did not provide the following required fields:
{field_list}

Original user message:
"{original_question}"

Instructions:
- Ask the user to provide ONLY the missing fields listed above. Do NOT ask for or request the field tool_name or any other fields that are not listed here.
create_project:
  - name: (string)
  - description: (string)
  - start_date: (YYYY-MM-DD)
  - end_date: (YYYY-MM-DD)
  - status: one of ["to do","in progress","pending approval","block","complete"]

create_task:
  - title: (string)
  - assigned_to: (string)
  - project_id: (integer)
  - due_date: (YYYY-MM-DD)
  - status: one of ["to do","in progress","pending approval","block","complete"]
- If status is missing, specify that the valid values are: to do, in progress, block, complete, or pending approval.
- For any missing date fields, ask the user to type the field name, followed by "is", and the date in the format YYYY-MM-DD.
- Do not restate what you already know or repeat the user's original message.
- If multiple fields are missing, ask for all of them in one prompt.
- Output ONLY the clarification prompt (no explanations, no code).
"#
    )
}

/// Prompt for classifying a new record as a near-duplicate of existing ones.
pub fn duplicate_prompt(new_item: &str, existing_items: &str, item_type: &str) -> String {
    format!(
        r#"You are a duplicate entry detection assistant.
Compare the newItem with every item in existingItems to determine if it is a duplicate.
For itemType = project, compare name and description.
For itemType = task, compare projectId and title.
Consider duplicates if the content is very similar (case-insensitive, allowing minor wording variations).
If existingItems is empty, return duplicate: false.
Return ONLY valid JSON with this exact structure:
{{
  "duplicate": true or false,
  "reason": "short explanation"
}}
Do not include any text, code fences, or explanation outside the JSON.

Item type: {item_type}
New item: {new_item}
Existing items: {existing_items}
"#
    )
}
