/// Answer the model is told to give when the context does not cover the question.
pub const NO_ANSWER: &str = "我無法從目前的資料中找到答案";

const INSTRUCTIONS: &str = "\
請根據以下天氣資料來回答問題。並且使用遊客中心廣播的口吻來回答
提醒遊客要根據天氣情況來做應變 比如：天氣熱要多喝水預防中暑 天氣陰暗提醒攜帶雨具
最後要加上遊客服務中心關心您的字樣來結束
如果你在資料中找不到答案，請回答「我無法從目前的資料中找到答案」
請只根據提供的資料使用中文(繁體) 回答，不要添加任何額外的天氣資訊。";

/// Fill the instruction template with retrieved `context` and the user's `question`.
pub fn render(context: &str, question: &str) -> String {
    format!("{INSTRUCTIONS}\n\n天氣資料：\n{context}\n\n問題：{question}\n\n回答：")
}
