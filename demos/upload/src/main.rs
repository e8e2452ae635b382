use std::env;
use vod_simple::*;

#[tokio::main]
async fn main() -> Result<(), VodError> {
    dotenvy::dotenv().ok();

    // You can create the client from ENV, or manually with `ClientOptions`.
    // `try_from_env` expects:
    // ```
    // # optional
    // VOD_DANGER_ALLOW_INSECURE=false
    // VOD_ENDPOINT=https://vod.cn-shanghai.aliyuncs.com
    // VOD_API_VERSION=2017-03-21
    // VOD_ACCESS_KEY_ID=
    // VOD_ACCESS_KEY_SECRET=
    // ```
    let vod = Vod::try_from_env()?;

    let path = env::args()
        .nth(1)
        .unwrap_or_else(|| "video.mp4".to_string());
    let options = UploadVideoOptions {
        title: Some("vod-simple demo".to_string()),
        ..Default::default()
    };

    // the file is uploaded in 8 MiB parts, progress goes from 0.0 to 1.0
    let video_id = vod
        .upload_file(&path, &options, |p| println!("{:.0}%", p * 100.0))
        .await?;
    println!("uploaded {} as video {}", path, video_id);

    // the video needs to be transcoded before it can be played, until then
    // this may respond with an error body
    let play_auth = vod.get_play_auth(&video_id).await?;
    println!("{}", play_auth);

    Ok(())
}
